//! Target feature dispatch for the interpreter lane loops.

#[cfg(target_arch = "x86_64")]
pub fn dispatch<R, F: FnOnce() -> R>(f: F) -> R {
    if is_x86_feature_detected!("avx2") {
        unsafe { dispatch_avx2(f) }
    } else if is_x86_feature_detected!("avx") {
        unsafe { dispatch_avx1(f) }
    } else if is_x86_feature_detected!("sse4.2") {
        unsafe { dispatch_sse42(f) }
    } else {
        f()
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn dispatch_avx2<R, F: FnOnce() -> R>(f: F) -> R {
    f()
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx")]
unsafe fn dispatch_avx1<R, F: FnOnce() -> R>(f: F) -> R {
    f()
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "sse4.2")]
unsafe fn dispatch_sse42<R, F: FnOnce() -> R>(f: F) -> R {
    f()
}

#[cfg(target_arch = "aarch64")]
pub fn dispatch<R, F: FnOnce() -> R>(f: F) -> R {
    if std::arch::is_aarch64_feature_detected!("neon") {
        unsafe { dispatch_neon(f) }
    } else {
        f()
    }
}

#[cfg(target_arch = "aarch64")]
#[target_feature(enable = "neon")]
unsafe fn dispatch_neon<R, F: FnOnce() -> R>(f: F) -> R {
    f()
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
pub fn dispatch<R, F: FnOnce() -> R>(f: F) -> R {
    f()
}

#[cfg(test)]
mod tests {
    use super::dispatch;

    #[test]
    fn returns_the_closure_result() {
        let lanes = [1u32, 2, 3, 4];
        assert_eq!(dispatch(|| lanes.iter().sum::<u32>()), 10);
    }
}
