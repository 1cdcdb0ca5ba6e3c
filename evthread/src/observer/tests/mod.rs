// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Observer and timer tests, driven by hand-cranked drains: each
//! `drain_queued_events()` call stands in for one loop iteration, which makes tick
//! counts exact instead of timing-dependent.
