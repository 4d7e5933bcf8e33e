//! Payroll deduction engine for Japanese monthly salaries
//!
//! This crate computes the statutory deductions from a monthly gross salary:
//! health insurance (with nursing care for ages 40 to 64), welfare pension,
//! employment insurance and withholding income tax, with a full audit trace.
//! Rates and bands come from a YAML rate scheme or from remote insurance
//! services behind the [`provider::RateProvider`] trait.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod provider;
