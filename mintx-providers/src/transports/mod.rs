mod common;
pub use common::{Request, Response, RpcError};

mod http;
pub use self::http::{Http, HttpClientError};

mod mock;
pub use mock::{MockError, MockProvider, MockResponse};
