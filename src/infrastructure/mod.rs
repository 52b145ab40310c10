pub mod countdown;
pub mod signal_source;

pub use countdown::CountdownTimer;
pub use signal_source::{
    EnvironmentSignal, SignalCallback, SignalSource, Subscription, SyntheticSignalSource,
};
