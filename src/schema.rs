table! {
    // (date, time) additionally carries a UNIQUE constraint; the booking
    // insert path relies on it as the final word against double-booking.
    appointments (id) {
        id -> Int8,
        first_name -> Varchar,
        family_name -> Varchar,
        phone -> Varchar,
        date -> Date,
        time -> Time,
        created_at -> Timestamp,
    }
}

table! {
    blocked_slots (id) {
        id -> Int8,
        start_date -> Date,
        end_date -> Nullable<Date>,
        start_time -> Nullable<Time>,
        end_time -> Nullable<Time>,
        all_day -> Bool,
        reason -> Varchar,
        block_type -> Varchar,
        recurring_pattern -> Nullable<Varchar>,
        created_at -> Timestamp,
    }
}

allow_tables_to_appear_in_same_query!(appointments, blocked_slots);
