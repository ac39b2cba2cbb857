pub mod certificate;
pub mod enrollment;
pub mod notification;
pub mod stats;
pub mod time;
pub mod workshop;

pub use certificate::*;
pub use enrollment::*;
pub use notification::*;
pub use stats::*;
pub use workshop::*;
