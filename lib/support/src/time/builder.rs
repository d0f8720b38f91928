#[macro_export]
macro_rules! t {
    (now) => {{
        $crate::time::DateTime::now()
    }};

    ($hour:literal : $minute:literal) => {{
        $crate::time::Time::at($hour, $minute).unwrap()
    }};

    ($amount:literal seconds) => {{
        $crate::time::Duration::seconds($amount)
    }};
    ($amount:literal minutes) => {{
        $crate::time::Duration::minutes($amount)
    }};
    ($amount:literal hours) => {{
        $crate::time::Duration::hours($amount)
    }};
    ($amount:literal days) => {{
        $crate::time::Duration::days($amount)
    }};
}
