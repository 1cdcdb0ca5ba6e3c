// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Chain composition and routing tests, hand-cranked drain by drain so every hop is
//! observable.

mod chain_tests;
