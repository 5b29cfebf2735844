#![allow(dead_code)]

mod helpers;
mod mock_api;
mod mock_surface;

pub use helpers::*;
pub use mock_api::*;
pub use mock_surface::*;
