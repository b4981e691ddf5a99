// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 三个由外部调度器按固定节奏调用的入口：
/// - 流水线工作器（pipeline_worker）：每次处理一个流水线任务
/// - 链接探测器（link_prober）：探测所有启用的联盟链接并生成健康报告
/// - 链接轮换器（link_rotator）：停用低点击率链接并给出替换建议
pub mod link_prober;
pub mod link_rotator;
pub mod pipeline_worker;

pub use link_prober::LinkProber;
pub use link_rotator::LinkRotator;
pub use pipeline_worker::PipelineWorker;
