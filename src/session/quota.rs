use crate::config::CONFIG;

/// Subscription class derived from the stored VIP level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Free,
    Premium,
}

impl Tier {
    pub fn from_vip_level(vip_level: i64) -> Self {
        if vip_level > 0 {
            Tier::Premium
        } else {
            Tier::Free
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Free => "FREE",
            Tier::Premium => "PREMIUM",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaDecision {
    pub allowed: bool,
    pub remaining: i64,
    pub limit: i64,
}

/// Pure daily-ceiling policy. The caller owns the counter; admission is a
/// read-only judgement over (count, tier).
#[derive(Debug, Clone, Copy)]
pub struct QuotaPolicy {
    pub free_daily_limit: i64,
    pub premium_daily_limit: i64,
}

impl QuotaPolicy {
    pub fn from_config() -> Self {
        QuotaPolicy {
            free_daily_limit: CONFIG.free_daily_limit,
            premium_daily_limit: CONFIG.premium_daily_limit,
        }
    }

    pub fn daily_limit(&self, tier: Tier) -> i64 {
        match tier {
            Tier::Free => self.free_daily_limit,
            Tier::Premium => self.premium_daily_limit,
        }
    }

    pub fn admit(&self, daily_requests: i64, tier: Tier) -> QuotaDecision {
        let limit = self.daily_limit(tier);
        QuotaDecision {
            allowed: daily_requests < limit,
            remaining: (limit - daily_requests).max(0),
            limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLICY: QuotaPolicy = QuotaPolicy {
        free_daily_limit: 25,
        premium_daily_limit: 1000,
    };

    #[test]
    fn tier_derivation_from_vip_level() {
        assert_eq!(Tier::from_vip_level(0), Tier::Free);
        assert_eq!(Tier::from_vip_level(1), Tier::Premium);
        assert_eq!(Tier::from_vip_level(5), Tier::Premium);
    }

    #[test]
    fn admits_below_the_ceiling_and_denies_at_it() {
        assert!(POLICY.admit(0, Tier::Free).allowed);
        assert!(POLICY.admit(24, Tier::Free).allowed);
        let denied = POLICY.admit(25, Tier::Free);
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
        assert_eq!(denied.limit, 25);
    }

    #[test]
    fn denial_is_monotonic_in_the_count() {
        let first_denied = (0..)
            .find(|&count| !POLICY.admit(count, Tier::Free).allowed)
            .unwrap();
        for count in first_denied..first_denied + 100 {
            assert!(!POLICY.admit(count, Tier::Free).allowed);
        }
    }

    #[test]
    fn premium_strictly_raises_the_ceiling() {
        assert!(POLICY.daily_limit(Tier::Premium) > POLICY.daily_limit(Tier::Free));
        // the same count can flip from denial to admission by tier alone
        assert!(!POLICY.admit(25, Tier::Free).allowed);
        assert!(POLICY.admit(25, Tier::Premium).allowed);
    }
}
