// src/cookies.rs
//! Cookies: [`Cookie`], the [`CookieJar`] capability and its backends.

mod cookie;
mod cookie_jar;
mod persistent_cookie_jar;

pub use cookie::Cookie;
pub use cookie::CookieJarHandle;

pub use cookie_jar::CookieJar;
pub use cookie_jar::DefaultCookieJar;
pub use persistent_cookie_jar::PersistentCookieJar;
