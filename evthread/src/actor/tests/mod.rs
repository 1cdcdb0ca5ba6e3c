// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Actor affinity tests: attach/detach/registry discipline, queued dispatch, and
//! reference liveness. Threads are mostly left unstarted and drained by hand so
//! every test is deterministic.
