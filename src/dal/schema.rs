table! {
    follows (id) {
        id -> Uuid,
        userid -> Uuid,
        community -> Varchar,
    }
}

table! {
    foods (id) {
        id -> Uuid,
        userid -> Uuid,
        created -> Timestamptz,
        name -> Varchar,
        quantity -> Float8,
        unit -> Nullable<Varchar>,
        expiration -> Timestamptz,
        prepared -> Bool,
    }
}

table! {
    listings (id) {
        id -> Uuid,
        userid -> Uuid,
        foodid -> Uuid,
        created -> Timestamptz,
        quantity -> Float8,
        price -> Varchar,
        name -> Varchar,
        unit -> Nullable<Varchar>,
        expiration -> Timestamptz,
    }
}

table! {
    sessions (id) {
        id -> Uuid,
        userid -> Uuid,
        created -> Timestamptz,
        expires -> Timestamptz,
    }
}

table! {
    users (id) {
        id -> Uuid,
        name -> Varchar,
        password_hash -> Varchar,
        email -> Varchar,
        allergies -> Array<Text>,
        restrictions -> Array<Text>,
        home_community -> Varchar,
        num_food -> Int4,
        thrown_away -> Int4,
    }
}

joinable!(follows -> users (userid));
joinable!(foods -> users (userid));
joinable!(listings -> foods (foodid));
joinable!(sessions -> users (userid));

allow_tables_to_appear_in_same_query!(
    follows,
    foods,
    listings,
    sessions,
    users,
);
