//! Synthetic vehicle dynamics.

pub mod dynamics;
