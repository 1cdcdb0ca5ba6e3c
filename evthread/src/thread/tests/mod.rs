// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Mechanism tests for the event thread: drain batching and reservation in
//! `drain_tests`, loop lifecycle and main-thread semantics in `lifecycle_tests`.

mod drain_tests;
