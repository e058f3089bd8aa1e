pub mod res {
    use ser_mapper::impl_dto;
    use utoipa::ToSchema;

    use crate::{
        datastore::identity::Identity,
        dto::{Datetime, _IdOptionRef, _IdRef},
    };

    impl_dto!(
        #[derive(ToSchema)]
        pub struct IdentityResponse<Identity> {
            id: String = id => _IdRef,
            created_at: Datetime = created_at,
            updated_at: Datetime = updated_at,

            username: String = username,
            provider_type: String = provider_type,

            user_id: String = user_id => _IdOptionRef,
            full_name: String = full_name,
            email: String = email,
            company: String = company,
            image_url: String = image_url,
            bio: String = bio,
            url: String = url,
        }
    );
}
