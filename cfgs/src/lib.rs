// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Control-flow-graph systems (CFGS): concurrent processes over shared
//! three-valued predicates, together with the guard language and the model
//! file format they are written in.

// configure clippy
#![allow(clippy::needless_return)]
#![allow(clippy::large_enum_variant)]
#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::type_complexity)]
#![deny(clippy::uninlined_format_args)]
// documentation-related lints (only checked when running rustdoc)
#![warn(missing_docs)]
#![allow(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod config;
pub mod loader;
pub mod model;
pub mod parser;
pub mod printer;
pub mod syntax;

pub use config::ConfigError;
pub use loader::LoadError;
