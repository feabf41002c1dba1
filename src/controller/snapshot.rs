use chrono::Utc;

use super::Controller;
use crate::entities::SnapshotInfo;

pub const SNAPSHOT_CAPTION: &str = "Shortest path on the map";

impl Controller {
    /// Rasterises the visible map into the snapshot region. On failure the
    /// previous snapshot stays where it is.
    #[tracing::instrument(skip(self))]
    pub fn export_snapshot(&mut self) {
        let session = match self.session.as_ref() {
            Some(session) => session,
            None => {
                tracing::warn!("snapshot requested without a live session");
                return;
            }
        };

        match session.widget.render() {
            Ok(raster) => {
                tracing::info!(
                    width = raster.width,
                    height = raster.height,
                    bytes = raster.png.len(),
                    "snapshot exported"
                );

                self.page.snapshot = Some(SnapshotInfo {
                    caption: SNAPSHOT_CAPTION.into(),
                    taken_at: Utc::now(),
                    width: raster.width,
                    height: raster.height,
                    bytes: raster.png.len(),
                });
                self.snapshot = Some(raster);
            }
            Err(err) => {
                tracing::error!("could not export snapshot: {}", err);
            }
        }
    }
}
