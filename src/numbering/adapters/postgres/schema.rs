//! Diesel schema for phone-number pool persistence.

diesel::table! {
    /// Pooled phone numbers and their assignment state.
    phone_numbers (number) {
        /// E.164 phone number.
        #[max_length = 20]
        number -> Varchar,
        /// Assignment status.
        #[max_length = 20]
        status -> Varchar,
        /// Holding tenant when assigned.
        assigned_tenant_id -> Nullable<Uuid>,
        /// Assignment timestamp when assigned.
        assigned_at -> Nullable<Timestamptz>,
        /// Pool-entry timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Tenant rows restricted to the columns this core touches.
    tenants (id) {
        /// Tenant identifier.
        id -> Uuid,
        /// Number held by the tenant, unique across tenants.
        #[max_length = 20]
        assigned_phone_number -> Nullable<Varchar>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(phone_numbers, tenants);
