// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! A SAT-based bounded model checker for control flow graphs with
//! three-valued predicates.

// configure clippy
#![allow(clippy::needless_return)]
#![allow(clippy::large_enum_variant)]
#![allow(clippy::type_complexity)]
#![deny(clippy::uninlined_format_args)]
// documentation-related lints (only checked when running rustdoc)
#![warn(missing_docs)]
#![allow(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod checker;
pub mod encode;
pub mod evaluator;
pub mod formula;
pub mod runner;
pub mod sat;
pub mod task;
pub mod timing;
pub mod witness;
