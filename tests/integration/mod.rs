// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod api_test;
pub mod helpers;
pub mod ingest_test;
pub mod link_prober_test;
pub mod link_rotator_test;
pub mod pipeline_test;
