mod admission;
mod window;

pub use admission::{
    Admission, ClientKey, LimitScope, RateLimiter, Rejection, WindowResetGuard,
};
pub use window::{KeyedWindowCounter, WindowCounter};
