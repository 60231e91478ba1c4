//! Service façades, one per entity family. Each façade owns trait-object
//! handles to the storage it touches and carries the domain rules: payload
//! validation, existence checks in argument order, and the feed write that
//! accompanies every graph mutation.

pub mod directors;
pub mod films;
pub mod genres;
pub mod mpa;
pub mod reviews;
pub mod users;

pub use directors::DirectorService;
pub use films::FilmService;
pub use genres::GenreService;
pub use mpa::MpaService;
pub use reviews::ReviewService;
pub use users::UserService;
