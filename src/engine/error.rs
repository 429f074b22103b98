use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DragError {
    #[error("drag target outside of any known drop zones")]
    OutsideDropZones,
    #[error("no drop zones configured")]
    NoDropZones,
}
