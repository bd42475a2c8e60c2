pub mod replay;
pub mod stub;

pub use replay::{RecordedFrame, Recording, ReplayProvider};
pub use stub::StubProvider;
