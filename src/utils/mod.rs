//! 工具函数模块

/// 转发地址列表的分隔符
pub const FORWARDED_SEPARATOR: char = ';';

/// 从转发头中取出客户端地址（列表中的第一个）
///
/// ```rust
/// use svc_kit::utils::remote_ip;
///
/// assert_eq!(remote_ip("10.0.0.1;192.168.1.1"), "10.0.0.1");
/// assert_eq!(remote_ip(""), "");
/// ```
pub fn remote_ip(ip_forwarded: &str) -> &str {
    ip_forwarded
        .split(FORWARDED_SEPARATOR)
        .next()
        .unwrap_or_default()
        .trim()
}
