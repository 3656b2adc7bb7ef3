//! Simplex noise and fractal Brownian motion.
//!
//! The CPU functions here follow the WGSL prelude in [`NOISE_WGSL`] step by
//! step, so tests and headless tools see the same field the GPU samples.
//! Lattice hashing uses the fixed polynomial `mod289((x * 34 + 1) * x)`; there
//! is no seed.

use glam::{Vec2, Vec3, Vec4};

/// Number of octaves summed by [`fbm`].
pub const FBM_OCTAVES: usize = 5;

const C2: Vec4 = Vec4::new(
    0.211_324_87,  // (3 - sqrt(3)) / 6
    0.366_025_4,   // (sqrt(3) - 1) / 2
    -0.577_350_26, // -1 + 2 * C2.x
    0.024_390_243, // 1 / 41
);

fn mod289_3(x: Vec3) -> Vec3 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

fn mod289_4(x: Vec4) -> Vec4 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

fn permute3(x: Vec3) -> Vec3 {
    mod289_3((x * 34.0 + Vec3::ONE) * x)
}

fn permute4(x: Vec4) -> Vec4 {
    mod289_4((x * 34.0 + Vec4::ONE) * x)
}

fn taylor_inv_sqrt(r: Vec4) -> Vec4 {
    Vec4::splat(1.792_842_9) - r * 0.853_734_7
}

fn fract3(x: Vec3) -> Vec3 {
    x - x.floor()
}

/// `step(edge, x)` per component: 0 where `x < edge`, otherwise 1.
fn step3(edge: Vec3, x: Vec3) -> Vec3 {
    Vec3::new(
        if x.x < edge.x { 0.0 } else { 1.0 },
        if x.y < edge.y { 0.0 } else { 1.0 },
        if x.z < edge.z { 0.0 } else { 1.0 },
    )
}

/// 2D simplex noise. Output lies roughly in [-1, 1].
pub fn simplex2(v: Vec2) -> f32 {
    // First corner
    let mut i = (v + Vec2::splat(v.dot(Vec2::splat(C2.y)))).floor();
    let x0 = v - i + Vec2::splat(i.dot(Vec2::splat(C2.x)));

    // Other corners
    let i1 = if x0.x > x0.y {
        Vec2::new(1.0, 0.0)
    } else {
        Vec2::new(0.0, 1.0)
    };
    let x1 = Vec2::new(x0.x + C2.x, x0.y + C2.x) - i1;
    let x2 = Vec2::new(x0.x + C2.z, x0.y + C2.z);

    // Permutations
    i = i - (i * (1.0 / 289.0)).floor() * 289.0;
    let p = permute3(
        permute3(Vec3::splat(i.y) + Vec3::new(0.0, i1.y, 1.0))
            + Vec3::splat(i.x)
            + Vec3::new(0.0, i1.x, 1.0),
    );

    let mut m = (Vec3::splat(0.5) - Vec3::new(x0.dot(x0), x1.dot(x1), x2.dot(x2))).max(Vec3::ZERO);
    m = m * m;
    m = m * m;

    // Gradients: 41 points uniformly over a line, mapped onto a diamond.
    let x = fract3(p * C2.w) * 2.0 - Vec3::ONE;
    let h = x.abs() - Vec3::splat(0.5);
    let ox = (x + Vec3::splat(0.5)).floor();
    let a0 = x - ox;

    m *= Vec3::splat(1.792_842_9) - (a0 * a0 + h * h) * 0.853_734_7;

    let g = Vec3::new(
        a0.x * x0.x + h.x * x0.y,
        a0.y * x1.x + h.y * x1.y,
        a0.z * x2.x + h.z * x2.y,
    );
    130.0 * m.dot(g)
}

/// 3D simplex noise. Output lies roughly in [-1, 1].
pub fn simplex3(v: Vec3) -> f32 {
    const C: Vec2 = Vec2::new(1.0 / 6.0, 1.0 / 3.0);

    // First corner
    let mut i = (v + Vec3::splat(v.dot(Vec3::splat(C.y)))).floor();
    let x0 = v - i + Vec3::splat(i.dot(Vec3::splat(C.x)));

    // Other corners
    let g = step3(Vec3::new(x0.y, x0.z, x0.x), x0);
    let l = Vec3::ONE - g;
    let l_zxy = Vec3::new(l.z, l.x, l.y);
    let i1 = g.min(l_zxy);
    let i2 = g.max(l_zxy);

    let x1 = x0 - i1 + Vec3::splat(C.x);
    let x2 = x0 - i2 + Vec3::splat(2.0 * C.x);
    let x3 = x0 - Vec3::ONE + Vec3::splat(3.0 * C.x);

    // Permutations
    i = mod289_3(i);
    let p = permute4(
        permute4(
            permute4(Vec4::splat(i.z) + Vec4::new(0.0, i1.z, i2.z, 1.0))
                + Vec4::splat(i.y)
                + Vec4::new(0.0, i1.y, i2.y, 1.0),
        ) + Vec4::splat(i.x)
            + Vec4::new(0.0, i1.x, i2.x, 1.0),
    );

    // Gradients: 7x7 points over a square, mapped onto an octahedron.
    let n_ = 1.0 / 7.0;
    let ns = Vec3::new(2.0 * n_, 0.5 * n_ - 1.0, n_);

    let j = p - (p * ns.z * ns.z).floor() * 49.0;
    let x_ = (j * ns.z).floor();
    let y_ = (j - x_ * 7.0).floor();

    let x = x_ * ns.x + Vec4::splat(ns.y);
    let y = y_ * ns.x + Vec4::splat(ns.y);
    let h = Vec4::ONE - x.abs() - y.abs();

    let b0 = Vec4::new(x.x, x.y, y.x, y.y);
    let b1 = Vec4::new(x.z, x.w, y.z, y.w);

    let s0 = b0.floor() * 2.0 + Vec4::ONE;
    let s1 = b1.floor() * 2.0 + Vec4::ONE;
    // -step(h, 0): -1 where h <= 0
    let sh = Vec4::new(
        if h.x <= 0.0 { -1.0 } else { 0.0 },
        if h.y <= 0.0 { -1.0 } else { 0.0 },
        if h.z <= 0.0 { -1.0 } else { 0.0 },
        if h.w <= 0.0 { -1.0 } else { 0.0 },
    );

    let a0 = Vec4::new(b0.x, b0.z, b0.y, b0.w)
        + Vec4::new(s0.x, s0.z, s0.y, s0.w) * Vec4::new(sh.x, sh.x, sh.y, sh.y);
    let a1 = Vec4::new(b1.x, b1.z, b1.y, b1.w)
        + Vec4::new(s1.x, s1.z, s1.y, s1.w) * Vec4::new(sh.z, sh.z, sh.w, sh.w);

    let mut p0 = Vec3::new(a0.x, a0.y, h.x);
    let mut p1 = Vec3::new(a0.z, a0.w, h.y);
    let mut p2 = Vec3::new(a1.x, a1.y, h.z);
    let mut p3 = Vec3::new(a1.z, a1.w, h.w);

    // Normalise gradients
    let norm = taylor_inv_sqrt(Vec4::new(p0.dot(p0), p1.dot(p1), p2.dot(p2), p3.dot(p3)));
    p0 *= norm.x;
    p1 *= norm.y;
    p2 *= norm.z;
    p3 *= norm.w;

    // Mix final noise value
    let mut m = (Vec4::splat(0.6)
        - Vec4::new(x0.dot(x0), x1.dot(x1), x2.dot(x2), x3.dot(x3)))
    .max(Vec4::ZERO);
    m = m * m;
    42.0 * (m * m).dot(Vec4::new(p0.dot(x0), p1.dot(x1), p2.dot(x2), p3.dot(x3)))
}

/// Fractal Brownian motion over [`simplex2`]: octave `k` is sampled at
/// frequency `2^k` with amplitude `0.5^(k + 1)`. The sum is not renormalised.
pub fn fbm(st: Vec2) -> f32 {
    let mut value = 0.0;
    let mut amplitude = 0.5;
    let mut st = st;
    for _ in 0..FBM_OCTAVES {
        value += amplitude * simplex2(st);
        st *= 2.0;
        amplitude *= 0.5;
    }
    value
}

/// WGSL prelude with `snoise2`, `snoise3` and `fbm`, prepended to every effect
/// shader that samples noise.
pub const NOISE_WGSL: &str = r#"
fn mod289_3(x: vec3<f32>) -> vec3<f32> {
    return x - floor(x * (1.0 / 289.0)) * 289.0;
}

fn mod289_4(x: vec4<f32>) -> vec4<f32> {
    return x - floor(x * (1.0 / 289.0)) * 289.0;
}

fn permute3(x: vec3<f32>) -> vec3<f32> {
    return mod289_3(((x * 34.0) + 1.0) * x);
}

fn permute4(x: vec4<f32>) -> vec4<f32> {
    return mod289_4(((x * 34.0) + 1.0) * x);
}

fn taylor_inv_sqrt(r: vec4<f32>) -> vec4<f32> {
    return 1.79284291400159 - 0.85373472095314 * r;
}

fn snoise2(v: vec2<f32>) -> f32 {
    let C = vec4<f32>(0.211324865405187, 0.366025403784439, -0.577350269189626, 0.024390243902439);
    var i = floor(v + dot(v, C.yy));
    let x0 = v - i + dot(i, C.xx);
    var i1 = vec2<f32>(0.0, 1.0);
    if (x0.x > x0.y) {
        i1 = vec2<f32>(1.0, 0.0);
    }
    var x12 = x0.xyxy + C.xxzz;
    x12 = vec4<f32>(x12.xy - i1, x12.zw);
    i = i - floor(i * (1.0 / 289.0)) * 289.0;
    let p = permute3(permute3(i.y + vec3<f32>(0.0, i1.y, 1.0)) + i.x + vec3<f32>(0.0, i1.x, 1.0));
    var m = max(vec3<f32>(0.5) - vec3<f32>(dot(x0, x0), dot(x12.xy, x12.xy), dot(x12.zw, x12.zw)), vec3<f32>(0.0));
    m = m * m;
    m = m * m;
    let x = 2.0 * fract(p * C.www) - 1.0;
    let h = abs(x) - 0.5;
    let ox = floor(x + 0.5);
    let a0 = x - ox;
    m = m * (1.79284291400159 - 0.85373472095314 * (a0 * a0 + h * h));
    let g = vec3<f32>(
        a0.x * x0.x + h.x * x0.y,
        a0.y * x12.x + h.y * x12.y,
        a0.z * x12.z + h.z * x12.w,
    );
    return 130.0 * dot(m, g);
}

fn snoise3(v: vec3<f32>) -> f32 {
    let C = vec2<f32>(1.0 / 6.0, 1.0 / 3.0);
    let D = vec4<f32>(0.0, 0.5, 1.0, 2.0);

    var i = floor(v + dot(v, C.yyy));
    let x0 = v - i + dot(i, C.xxx);

    let g = step(x0.yzx, x0.xyz);
    let l = 1.0 - g;
    let i1 = min(g.xyz, l.zxy);
    let i2 = max(g.xyz, l.zxy);

    let x1 = x0 - i1 + C.xxx;
    let x2 = x0 - i2 + 2.0 * C.xxx;
    let x3 = x0 - 1.0 + 3.0 * C.xxx;

    i = mod289_3(i);
    let p = permute4(permute4(permute4(
        i.z + vec4<f32>(0.0, i1.z, i2.z, 1.0))
        + i.y + vec4<f32>(0.0, i1.y, i2.y, 1.0))
        + i.x + vec4<f32>(0.0, i1.x, i2.x, 1.0));

    let n_ = 1.0 / 7.0;
    let ns = n_ * D.wyz - D.xzx;

    let j = p - 49.0 * floor(p * ns.z * ns.z);
    let x_ = floor(j * ns.z);
    let y_ = floor(j - 7.0 * x_);

    let x = x_ * ns.x + ns.yyyy;
    let y = y_ * ns.x + ns.yyyy;
    let h = 1.0 - abs(x) - abs(y);

    let b0 = vec4<f32>(x.xy, y.xy);
    let b1 = vec4<f32>(x.zw, y.zw);

    let s0 = floor(b0) * 2.0 + 1.0;
    let s1 = floor(b1) * 2.0 + 1.0;
    let sh = -step(h, vec4<f32>(0.0));

    let a0 = b0.xzyw + s0.xzyw * sh.xxyy;
    let a1 = b1.xzyw + s1.xzyw * sh.zzww;

    var p0 = vec3<f32>(a0.xy, h.x);
    var p1 = vec3<f32>(a0.zw, h.y);
    var p2 = vec3<f32>(a1.xy, h.z);
    var p3 = vec3<f32>(a1.zw, h.w);

    let norm = taylor_inv_sqrt(vec4<f32>(dot(p0, p0), dot(p1, p1), dot(p2, p2), dot(p3, p3)));
    p0 = p0 * norm.x;
    p1 = p1 * norm.y;
    p2 = p2 * norm.z;
    p3 = p3 * norm.w;

    var m = max(vec4<f32>(0.6) - vec4<f32>(dot(x0, x0), dot(x1, x1), dot(x2, x2), dot(x3, x3)), vec4<f32>(0.0));
    m = m * m;
    return 42.0 * dot(m * m, vec4<f32>(dot(p0, x0), dot(p1, x1), dot(p2, x2), dot(p3, x3)));
}

fn fbm(st_in: vec2<f32>) -> f32 {
    var value = 0.0;
    var amplitude = 0.5;
    var st = st_in;
    for (var i = 0; i < 5; i = i + 1) {
        value = value + amplitude * snoise2(st);
        st = st * 2.0;
        amplitude = amplitude * 0.5;
    }
    return value;
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: [Vec2; 6] = [
        Vec2::new(0.0, 0.0),
        Vec2::new(0.37, 1.91),
        Vec2::new(-4.2, 3.3),
        Vec2::new(12.5, -7.75),
        Vec2::new(100.1, 0.02),
        Vec2::new(-0.5, -0.5),
    ];

    #[test]
    fn simplex2_is_deterministic() {
        for point in SAMPLES {
            assert_eq!(simplex2(point).to_bits(), simplex2(point).to_bits());
        }
    }

    #[test]
    fn simplex3_is_deterministic() {
        for point in SAMPLES {
            let p = point.extend(point.x * 0.5 - 1.0);
            assert_eq!(simplex3(p).to_bits(), simplex3(p).to_bits());
        }
    }

    #[test]
    fn simplex2_is_continuous() {
        for point in SAMPLES {
            let a = simplex2(point);
            let b = simplex2(point + Vec2::splat(0.001));
            assert!((a - b).abs() < 0.1, "jump at {point:?}: {a} vs {b}");
        }
    }

    #[test]
    fn simplex3_is_continuous() {
        for point in SAMPLES {
            let p = point.extend(0.25);
            let a = simplex3(p);
            let b = simplex3(p + Vec3::splat(0.001));
            assert!((a - b).abs() < 0.1, "jump at {p:?}: {a} vs {b}");
        }
    }

    #[test]
    fn noise_stays_near_unit_range() {
        for ix in -20..20 {
            for iy in -20..20 {
                let p = Vec2::new(ix as f32 * 0.173, iy as f32 * 0.291);
                assert!(simplex2(p).abs() <= 1.1);
                assert!(simplex3(p.extend(ix as f32 * 0.07)).abs() <= 1.1);
            }
        }
    }

    #[test]
    fn noise_varies_across_the_lattice() {
        let values: Vec<f32> = (0..32)
            .map(|i| simplex2(Vec2::new(i as f32 * 0.37, 0.5)))
            .collect();
        let min = values.iter().copied().fold(f32::MAX, f32::min);
        let max = values.iter().copied().fold(f32::MIN, f32::max);
        assert!(max - min > 0.5);
    }

    #[test]
    fn fbm_is_weighted_octave_sum() {
        let point = Vec2::new(1.3, -2.7);
        let expected: f32 = (0..FBM_OCTAVES)
            .map(|k| 0.5f32.powi(k as i32 + 1) * simplex2(point * 2f32.powi(k as i32)))
            .sum();
        assert!((fbm(point) - expected).abs() < 1e-6);
    }
}
