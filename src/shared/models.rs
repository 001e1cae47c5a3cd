pub mod schema {
    diesel::table! {
        import_batches (id) {
            id -> Uuid,
            source -> Text,
            label -> Nullable<Text>,
            lead_count -> Int4,
            created_by -> Nullable<Uuid>,
            created_at -> Timestamptz,
        }
    }

    diesel::table! {
        leads (id) {
            id -> Uuid,
            first_name -> Text,
            last_name -> Text,
            phone -> Text,
            email -> Nullable<Text>,
            address_line1 -> Nullable<Text>,
            address_line2 -> Nullable<Text>,
            city -> Nullable<Text>,
            postcode -> Nullable<Text>,
            appliance_cover -> Bool,
            boiler_cover -> Bool,
            boiler_cover_price -> Nullable<Numeric>,
            monthly_total -> Numeric,
            status -> Text,
            assigned_agent_id -> Uuid,
            checked_out_by -> Nullable<Uuid>,
            checked_out_at -> Nullable<Timestamptz>,
            callback_at -> Nullable<Timestamptz>,
            times_contacted -> Int4,
            last_contact_attempt_at -> Nullable<Timestamptz>,
            last_disposition_at -> Nullable<Timestamptz>,
            last_disposition_by -> Nullable<Uuid>,
            do_not_call -> Bool,
            import_batch_id -> Nullable<Uuid>,
            created_by -> Nullable<Uuid>,
            source -> Nullable<Text>,
            created_at -> Timestamptz,
            updated_at -> Timestamptz,
        }
    }

    diesel::table! {
        lead_appliance_items (id) {
            id -> Uuid,
            lead_id -> Uuid,
            appliance_type -> Text,
            brand -> Nullable<Text>,
            cover_limit -> Nullable<Numeric>,
            monthly_cost -> Numeric,
            created_at -> Timestamptz,
        }
    }

    diesel::table! {
        lead_dispositions (id) {
            id -> Uuid,
            lead_id -> Uuid,
            agent_id -> Uuid,
            status -> Text,
            notes -> Nullable<Text>,
            metadata -> Nullable<Jsonb>,
            created_at -> Timestamptz,
        }
    }

    diesel::table! {
        sales (id) {
            id -> Uuid,
            first_name -> Text,
            last_name -> Text,
            phone -> Text,
            email -> Nullable<Text>,
            address_line1 -> Nullable<Text>,
            address_line2 -> Nullable<Text>,
            city -> Nullable<Text>,
            postcode -> Nullable<Text>,
            appliance_cover -> Bool,
            boiler_cover -> Bool,
            boiler_cover_price -> Nullable<Numeric>,
            monthly_total -> Numeric,
            bank_account -> Text,
            sort_code -> Text,
            first_collection_date -> Date,
            payment_status -> Text,
            agent_id -> Uuid,
            source -> Nullable<Text>,
            created_at -> Timestamptz,
            updated_at -> Timestamptz,
        }
    }

    diesel::table! {
        sale_appliance_items (id) {
            id -> Uuid,
            sale_id -> Uuid,
            appliance_type -> Text,
            brand -> Nullable<Text>,
            cover_limit -> Nullable<Numeric>,
            monthly_cost -> Numeric,
            created_at -> Timestamptz,
        }
    }

    diesel::table! {
        lead_sale_links (id) {
            id -> Uuid,
            lead_id -> Uuid,
            sale_id -> Uuid,
            agent_id -> Uuid,
            created_at -> Timestamptz,
        }
    }
}

pub use schema::*;
