pub mod director;
pub mod event;
pub mod film;
pub mod review;
pub mod user;

pub use director::Director;
pub use event::{Event, EventOperation, EventType};
pub use film::{Film, Genre, Mpa};
pub use review::Review;
pub use user::User;
