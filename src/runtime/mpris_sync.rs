use crate::app::App;
use crate::mpris::MprisHandle;

pub fn update_mpris(mpris: &MprisHandle, app: &App) {
    let snapshot = app.latest_snapshot().unwrap_or_default();

    let track = snapshot.current.and_then(|i| snapshot.queue.get(i));
    mpris.set_track_metadata(snapshot.current, track);
    mpris.set_playback(snapshot.state);
}
