pub mod res {
    use lib_core::paging::PagingLinks;
    use serde::Serialize;
    use utoipa::ToSchema;

    use crate::dto::identity::res::{IdentityResponse, _IdentityResponseVec};

    #[derive(Serialize, ToSchema)]
    pub struct CollaboratorListMeta {
        /// Members in the space policy, regardless of the requested page
        #[serde(rename = "totalCount")]
        pub total_count: usize,
    }

    #[derive(Serialize, ToSchema)]
    pub struct CollaboratorListResponse {
        #[schema(value_type = Vec<IdentityResponse>)]
        pub data: _IdentityResponseVec,
        pub meta: CollaboratorListMeta,
        pub links: PagingLinks,
    }
}

pub mod req {
    use serde::Deserialize;
    use utoipa::{IntoParams, ToSchema};
    use validator::Validate;

    /// Identity to add to or remove from a space
    ///
    /// The id is kept as received; a malformed value is rejected with a
    /// bad request once the batch is processed.
    #[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
    pub struct UpdateUserId {
        pub id: String,
    }

    impl From<&str> for UpdateUserId {
        fn from(id: &str) -> Self {
            Self {
                id: id.to_owned(),
            }
        }
    }

    /// Batch payload, `null` entries are skipped
    #[derive(Debug, Default, Deserialize, ToSchema, Validate)]
    pub struct UpdateUserIdList {
        #[serde(default)]
        pub data: Option<Vec<Option<UpdateUserId>>>,
    }

    #[derive(Debug, Default, Deserialize, IntoParams)]
    #[into_params(parameter_in = Query)]
    pub struct PageQuery {
        #[serde(rename = "page[offset]")]
        pub page_offset: Option<String>,

        #[serde(rename = "page[limit]")]
        pub page_limit: Option<i64>,
    }
}
