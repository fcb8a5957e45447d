// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod importer;
pub mod ledger;
pub mod models;
pub mod reports;
pub mod store;
pub mod tax;
pub mod utils;

pub use error::{Error, Result};
