//! 秘密生成与摘要
//!
//! 明文只用于投递，落库的是 SHA-256 十六进制摘要。

use rand::{Rng, RngCore};
use sha2::{Digest, Sha256};

/// 6 位数字验证码（保留前导零）
pub fn generate_numeric_code() -> String {
    let mut rng = rand::thread_rng();
    format!("{:06}", rng.gen_range(0..1_000_000u32))
}

/// 32 字节随机令牌，十六进制编码
pub fn generate_opaque_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// 计算秘密摘要
pub fn hash_secret(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}
