//! Spring-driven target motion

pub mod spring;

pub use spring::{SecondOrderDynamics, SpringParams, SpringPreset, SpringTarget};
