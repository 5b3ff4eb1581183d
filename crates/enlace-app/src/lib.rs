// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod connections;
pub mod ids;
pub mod log;
pub mod menu;
pub mod model;
pub mod selection;
pub mod workspace;

pub use connections::*;
pub use ids::*;
pub use log::*;
pub use menu::*;
pub use model::*;
pub use selection::*;
pub use workspace::*;
