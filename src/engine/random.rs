// ==========================================
// 工序执行质量追踪系统 - 随机源
// ==========================================
// 职责: 为复选框指标的随机不合格量提供可注入的随机源
// 约束: 每个请求独立实例，不跨请求共享随机状态
// ==========================================

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 随机源 Trait
///
/// `next_fraction` 返回 `[0, 1)` 内的均匀分布值
pub trait RandomSource: Send {
    fn next_fraction(&mut self) -> f64;

    /// 在 `[0, upper)` 上均匀取值；`upper <= 0` 时返回 0
    fn uniform(&mut self, upper: f64) -> f64 {
        if upper <= 0.0 {
            return 0.0;
        }
        self.next_fraction() * upper
    }
}

/// 熵源随机（生产默认）
pub struct EntropyRandomSource {
    rng: StdRng,
}

impl EntropyRandomSource {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl Default for EntropyRandomSource {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for EntropyRandomSource {
    fn next_fraction(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// 固定种子随机（可复现）
pub struct SeededRandomSource {
    rng: StdRng,
}

impl SeededRandomSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandomSource {
    fn next_fraction(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// 常量随机（测试用）
///
/// 值被截断到 `[0, 1)`
pub struct FixedRandomSource {
    fraction: f64,
}

impl FixedRandomSource {
    pub fn new(fraction: f64) -> Self {
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0 - f64::EPSILON)
        } else {
            0.0
        };
        Self { fraction }
    }
}

impl RandomSource for FixedRandomSource {
    fn next_fraction(&mut self) -> f64 {
        self.fraction
    }
}

// ==========================================
// RandomSourceFactory - 按请求创建随机源
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RandomSourceFactory {
    Entropy,
    Seeded(u64),
}

impl RandomSourceFactory {
    /// 为一次请求创建独立随机源
    pub fn create(&self) -> Box<dyn RandomSource> {
        match self {
            RandomSourceFactory::Entropy => Box::new(EntropyRandomSource::new()),
            RandomSourceFactory::Seeded(seed) => Box::new(SeededRandomSource::new(*seed)),
        }
    }
}

impl Default for RandomSourceFactory {
    fn default() -> Self {
        RandomSourceFactory::Entropy
    }
}
