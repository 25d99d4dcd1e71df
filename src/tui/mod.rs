//! Terminal front end: Elm-style app state, views and backend services.

pub mod app;
pub mod events;
pub mod layout;
pub mod services;
pub mod theme;
pub mod views;
pub mod widgets;
