//! 支付结果模拟器
//!
//! 网关通过 trait 对象抽取交易结果与令牌，测试中可替换为确定性的 mock。

use parking_lot::Mutex;
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::models::FailureReason;

/// 令牌字符集：大写字母与数字
const TOKEN_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// 令牌长度
pub const TOKEN_LEN: usize = 16;

/// 支付结果来源
#[cfg_attr(test, mockall::automock)]
pub trait PaymentSimulator: Send + Sync {
    /// 抽取一次处理结果，`None` 表示成功
    fn outcome(&self) -> Option<FailureReason>;

    /// 生成交易或退款令牌
    fn generate_id(&self) -> String;
}

/// 基于随机数的模拟器
///
/// 给定种子时结果序列可复现
pub struct RandomSimulator {
    rng: Mutex<StdRng>,
    success_rate: f64,
}

impl RandomSimulator {
    pub fn new(success_rate: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            rng: Mutex::new(rng),
            success_rate: success_rate.clamp(0.0, 1.0),
        }
    }

    pub fn success_rate(&self) -> f64 {
        self.success_rate
    }
}

impl Default for RandomSimulator {
    fn default() -> Self {
        Self::new(0.9, None)
    }
}

impl PaymentSimulator for RandomSimulator {
    fn outcome(&self) -> Option<FailureReason> {
        let mut rng = self.rng.lock();
        if rng.gen_bool(self.success_rate) {
            None
        } else {
            let idx = rng.gen_range(0..FailureReason::ALL.len());
            Some(FailureReason::ALL[idx])
        }
    }

    fn generate_id(&self) -> String {
        let mut rng = self.rng.lock();
        (0..TOKEN_LEN)
            .map(|_| TOKEN_CHARSET[rng.gen_range(0..TOKEN_CHARSET.len())] as char)
            .collect()
    }
}
