diesel::table! {
    reminders (id) {
        id -> BigInt,
        text -> Text,
        created_at -> Text,
        remind_time -> Nullable<Text>,
    }
}
