pub mod angle;
pub mod replay;
pub mod session;
pub mod smooth;
pub mod throttle;

pub use angle::{compute_angle, vertex_angle, AngleCalculator, AngleParams, MeasurementMode};
pub use replay::{replay, ReplayStats};
pub use session::{AngleReading, MeasurementSession, SessionError, SessionPhase, SessionSnapshot};
pub use smooth::EmaSmoother;
pub use throttle::FrameThrottle;
