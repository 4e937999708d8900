//! 共形纬度与角度辅助函数（源自 `GeographicLib` 的数值稳定写法）

/// e * atanh(e * x) 的稳定计算
#[inline]
pub fn eatanhe(x: f64, es: f64) -> f64 {
    if es > 0.0 {
        es * (es * x).atanh()
    } else if es < 0.0 {
        -es * (-es * x).atan()
    } else {
        0.0
    }
}

/// tan(φ) → tan(χ) 共形纬度正向转换 (Karney Eq. 7-9)
#[inline]
pub fn taupf(tau: f64, es: f64) -> f64 {
    let tau1 = (1.0 + tau * tau).sqrt();
    let sig = eatanhe(tau / tau1, es).sinh();
    (1.0 + sig * sig).sqrt() * tau - sig * tau1
}

/// tan(χ) → tan(φ) 共形纬度逆向转换 (Karney Eq. 19-21)
/// 使用 Newton 迭代求解
pub fn tauf(taup: f64, es: f64) -> f64 {
    const MAX_ITER: usize = 8;
    const TOL: f64 = 1.490_116_119_384_765_6e-8; // sqrt(f64::EPSILON)

    let e2m = 1.0 - es * es;
    let mut tau = taup / e2m.sqrt();
    let stol = TOL * taup.abs().max(1.0);

    for _ in 0..MAX_ITER {
        let taupa = taupf(tau, es);
        let dtau = (taup - taupa) * (1.0 + e2m * tau * tau)
            / (e2m * (1.0 + tau * tau).sqrt() * (1.0 + taupa * taupa).sqrt());
        tau += dtau;
        if dtau.abs() < stol {
            break;
        }
    }
    tau
}

/// 等量纬度 ψ = asinh(tan χ)
#[inline]
pub fn isometric_latitude(lat_rad: f64, es: f64) -> f64 {
    taupf(lat_rad.tan(), es).asinh()
}

/// 由等量纬度反求大地纬度（弧度）
#[inline]
pub fn latitude_from_isometric(psi: f64, es: f64) -> f64 {
    tauf(psi.sinh(), es).atan()
}

/// 角度归一化到 [-180, 180)
#[inline]
pub fn ang_normalize(x: f64) -> f64 {
    let mut x = x % 360.0;
    if x < -180.0 {
        x += 360.0;
    }
    if x >= 180.0 {
        x -= 360.0;
    }
    x
}
