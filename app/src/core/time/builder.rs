#[macro_export]
macro_rules! t {
    (now) => {{
        $crate::core::time::DateTime::now()
    }};

    ($amount:literal millis) => {{
        $crate::core::time::Duration::millis($amount)
    }};
    ($amount:literal seconds) => {{
        $crate::core::time::Duration::seconds($amount)
    }};
    ($amount:literal minutes) => {{
        $crate::core::time::Duration::minutes($amount)
    }};

    ($amount:literal minutes ago) => {{
        t!(now) - t!($amount minutes)
    }};
    (in $amount:literal minutes) => {{
        t!(now) + t!($amount minutes)
    }};
}

#[cfg(test)]
mod tests {
    use crate::core::time::*;

    #[test]
    fn test_now() {
        let now = t!(now);
        assert!(DateTime::now().elapsed_since(now) < Duration::seconds(1));
    }

    #[test]
    fn test_durations() {
        assert_eq!(t!(30 seconds), Duration::seconds(30));
        assert_eq!(t!(15 minutes), Duration::seconds(900));
        assert_eq!(t!(250 millis), Duration::millis(250));
    }

    #[tokio::test]
    async fn test_fixed_now() {
        let fixed = DateTime::from_iso("2025-01-10T10:07:30+00:00").unwrap();

        FIXED_NOW
            .scope(fixed, async {
                assert_eq!(t!(now), fixed);
                assert_eq!(t!(in 15 minutes), fixed + Duration::minutes(15));
                assert_eq!(t!(5 minutes ago), fixed - Duration::minutes(5));
            })
            .await;
    }
}
