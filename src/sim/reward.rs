/// Coupon rewards for cleared levels.
///
/// One static entry per maze level. Codes are random 4-digit numbers;
/// coupons only live for the session.

use rand::Rng;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Coupon {
    pub title: &'static str,
    pub description: &'static str,
    /// 1000..=9999
    pub code: u16,
    /// 0-based level the coupon was issued for.
    pub level: usize,
}

const MAZE_COUPONS: [(&str, &str); 7] = [
    ("Maze Explorer - Level 1 Reward", "Complete Maze Level 1 and get 10% off your next purchase"),
    ("Maze Explorer - Level 2 Reward", "Complete Maze Level 2 and get free shipping on your order"),
    ("Maze Explorer - Level 3 Reward", "Ghost mode mastery! Get an exclusive VIP discount"),
    ("Maze Explorer - Level 4 Reward", "Trapped no more! Earn a special weekend discount"),
    ("Maze Explorer - Level 5 Reward", "Complex maze completed! Early access to our flash sale"),
    ("Maze Explorer - Level 6 Reward", "Speed demon! Bonus rewards for your accomplishment"),
    ("Maze Explorer - Level 7 Reward", "Maze master! Special birthday month offer"),
];

/// Number of distinct coupons a full run can earn.
pub fn total_coupons() -> usize {
    MAZE_COUPONS.len()
}

/// Issue the coupon for `level`. Levels without an entry get a random one.
pub fn issue_coupon<R: Rng + ?Sized>(level: usize, rng: &mut R) -> Coupon {
    let idx = if level < MAZE_COUPONS.len() {
        level
    } else {
        rng.gen_range(0..MAZE_COUPONS.len())
    };
    let (title, description) = MAZE_COUPONS[idx];
    Coupon {
        title,
        description,
        code: rng.gen_range(1000..=9999),
        level,
    }
}

impl Coupon {
    pub fn code_str(&self) -> String {
        format!("{:04}", self.code)
    }
}
