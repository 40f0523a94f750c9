pub mod jwt;

pub use jwt::{JwtUserInfo, bearer_token, decode_payload, user_id_from_jwt, verify_user_info};
