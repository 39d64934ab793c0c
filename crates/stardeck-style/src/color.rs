//! RGBA colour with the blend and brightness helpers the style cache needs.

/// A 32-bit RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// Fully opaque colour from RGB channels.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Colour with an explicit alpha channel.
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);

    /// Opaque colour from a `0xRRGGBB` integer (config files store these).
    #[must_use]
    pub const fn from_hex(hex: u32) -> Self {
        Self::rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }

    /// Replace the alpha channel.
    #[must_use]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Scale all channels by a 0–100 brightness percentage.
    ///
    /// This is the global colour-brightness dimmer: 100 is identity, 0 is
    /// black. Alpha is preserved.
    #[must_use]
    pub fn scale(self, percent: u8) -> Self {
        let p = u32::from(percent.min(100));
        let mul = |c: u8| ((u32::from(c) * p) / 100) as u8;
        Self {
            r: mul(self.r),
            g: mul(self.g),
            b: mul(self.b),
            a: self.a,
        }
    }

    /// Alpha-blend `self` over `under`, ignoring `under`'s own alpha.
    #[must_use]
    pub fn blend_over(self, under: Rgba) -> Rgba {
        let a = u32::from(self.a);
        let inv = 255 - a;
        let mix = |top: u8, bot: u8| ((u32::from(top) * a + u32::from(bot) * inv) / 255) as u8;
        Rgba::rgb(
            mix(self.r, under.r),
            mix(self.g, under.g),
            mix(self.b, under.b),
        )
    }

    /// Linear mix towards `other` by `t ∈ [0, 1]`.
    #[must_use]
    pub fn mix(self, other: Rgba, t: f32) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        let lerp = |a: u8, b: u8| (f32::from(a) + (f32::from(b) - f32::from(a)) * t).round() as u8;
        Rgba::rgba(
            lerp(self.r, other.r),
            lerp(self.g, other.g),
            lerp(self.b, other.b),
            lerp(self.a, other.a),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn scale_identity_and_black() {
        let c = Rgba::rgb(120, 80, 200);
        assert_eq!(c.scale(100), c);
        assert_eq!(c.scale(0), Rgba::rgb(0, 0, 0));
    }

    #[test]
    fn scale_preserves_alpha() {
        let c = Rgba::rgba(100, 100, 100, 40);
        assert_eq!(c.scale(50).a, 40);
    }

    #[test]
    fn blend_over_opaque_wins() {
        let top = Rgba::rgb(10, 20, 30);
        assert_eq!(top.blend_over(Rgba::WHITE), top);
    }

    #[test]
    fn blend_over_transparent_passes_through() {
        let top = Rgba::rgba(10, 20, 30, 0);
        assert_eq!(top.blend_over(Rgba::WHITE), Rgba::WHITE);
    }

    proptest! {
        #[test]
        fn scale_never_brightens(r: u8, g: u8, b: u8, p in 0u8..=100) {
            let c = Rgba::rgb(r, g, b);
            let s = c.scale(p);
            prop_assert!(s.r <= c.r && s.g <= c.g && s.b <= c.b);
        }
    }
}
