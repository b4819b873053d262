// Table definitions for the report store. Kept in sync by hand with the
// DDL in repository/context.rs.

diesel::table! {
    status (id) {
        id -> BigInt,
        #[sql_name = "status"]
        report_status -> Text,
        reported_at -> Nullable<Text>,
        editable -> Integer,
    }
}

diesel::table! {
    details (id) {
        id -> BigInt,
        category -> Text,
        title -> Text,
        description -> Nullable<Text>,
    }
}

diesel::table! {
    location (id) {
        id -> BigInt,
        latitude -> Double,
        longitude -> Double,
        council -> Text,
    }
}

diesel::table! {
    method (id) {
        id -> BigInt,
        #[sql_name = "method"]
        report_method -> Text,
    }
}

diesel::table! {
    updates (id) {
        id -> BigInt,
        update_count -> Integer,
        latest_update_at -> Nullable<Text>,
    }
}

diesel::table! {
    logs (id) {
        id -> BigInt,
        outcome -> Text,
        ingested_at -> Text,
    }
}

diesel::table! {
    crawl_state (id) {
        id -> Integer,
        upper_number -> BigInt,
        autofind -> Integer,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    status,
    details,
    location,
    method,
    updates,
    logs,
    crawl_state,
);
