//! 几何图形模块

/// 2D 点
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// 尺寸
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// 矩形，节点的布局盒由宿主写入
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn left(&self) -> f32 { self.x }
    pub fn top(&self) -> f32 { self.y }
    pub fn right(&self) -> f32 { self.x + self.width }
    pub fn bottom(&self) -> f32 { self.y + self.height }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.x && point.x <= self.right() &&
        point.y >= self.y && point.y <= self.bottom()
    }

    /// x 坐标在矩形宽度上的比例，限制在 [0, 1]
    pub fn fraction_x(&self, x: f32) -> f32 {
        if self.width <= 0.0 {
            return 0.0;
        }
        ((x - self.x) / self.width).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction_x_clamps() {
        let r = Rect::new(10.0, 0.0, 100.0, 20.0);
        assert_eq!(r.fraction_x(60.0), 0.5);
        assert_eq!(r.fraction_x(-5.0), 0.0);
        assert_eq!(r.fraction_x(500.0), 1.0);
        assert_eq!(Rect::default().fraction_x(3.0), 0.0);
    }
}
