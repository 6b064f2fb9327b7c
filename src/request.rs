//! Request and response values exchanged between producers, the scheduler, and transports.

// self
use crate::_prelude::*;

/// Unique, monotonically assigned identifier of a request within one client.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(u64);
impl RequestId {
	/// Wraps a raw identifier.
	pub const fn new(raw: u64) -> Self {
		Self(raw)
	}

	/// Returns the raw identifier.
	pub const fn get(self) -> u64 {
		self.0
	}
}
impl Debug for RequestId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Request({})", self.0)
	}
}
impl Display for RequestId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		Display::fmt(&self.0, f)
	}
}

/// HTTP verbs producers can issue.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
	/// `GET`
	#[default]
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `PATCH`
	Patch,
	/// `DELETE`
	Delete,
	/// `HEAD`
	Head,
}
impl Method {
	/// Returns the canonical upper-case verb.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Patch => "PATCH",
			Method::Delete => "DELETE",
			Method::Head => "HEAD",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
#[cfg(feature = "reqwest")]
impl From<Method> for reqwest::Method {
	fn from(method: Method) -> Self {
		match method {
			Method::Get => reqwest::Method::GET,
			Method::Post => reqwest::Method::POST,
			Method::Put => reqwest::Method::PUT,
			Method::Patch => reqwest::Method::PATCH,
			Method::Delete => reqwest::Method::DELETE,
			Method::Head => reqwest::Method::HEAD,
		}
	}
}

/// Immutable request created by the client facade.
///
/// Ownership moves from the producer into the admission queue, then to the scheduler, and
/// finally to the transport; listeners receive clones.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
	id: RequestId,
	method: Method,
	url: Url,
	created_at: Duration,
}
impl Request {
	/// Creates a request stamped with the client's elapsed time.
	pub fn new(id: RequestId, method: Method, url: Url, created_at: Duration) -> Self {
		Self { id, method, url, created_at }
	}

	/// Request identifier.
	pub fn id(&self) -> RequestId {
		self.id
	}

	/// HTTP verb.
	pub fn method(&self) -> Method {
		self.method
	}

	/// Target URL.
	pub fn url(&self) -> &Url {
		&self.url
	}

	/// Clock time at which the request was created.
	pub fn created_at(&self) -> Duration {
		self.created_at
	}
}
impl Display for Request {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{} {} ({})", self.method, self.url, self.id)
	}
}

/// Outcome of a completed transport call.
///
/// Additional fields may be added in future releases, so downstream code should construct
/// values using field names instead of struct update syntax.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
	/// Identifier of the request this response answers.
	pub request_id: RequestId,
	/// HTTP status code.
	pub status: u16,
	/// Raw response payload.
	pub body: Vec<u8>,
}
impl Response {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Decodes the body as UTF-8, replacing invalid sequences.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn method_labels_are_upper_case() {
		assert_eq!(Method::Get.to_string(), "GET");
		assert_eq!(Method::Delete.as_str(), "DELETE");
		assert_eq!(
			serde_json::to_string(&Method::Patch).expect("Method should serialize."),
			"\"PATCH\""
		);
	}

	#[test]
	fn request_display_includes_verb_url_and_id() {
		let url = Url::parse("http://localhost:8080/foo").expect("Fixture URL should parse.");
		let request = Request::new(RequestId::new(3), Method::Get, url, Duration::ZERO);

		assert_eq!(request.to_string(), "GET http://localhost:8080/foo (3)");
		assert_eq!(format!("{:?}", request.id()), "Request(3)");
	}

	#[test]
	fn response_helpers_report_status_and_text() {
		let response = Response { request_id: RequestId::new(1), status: 204, body: b"ok".to_vec() };

		assert!(response.is_success());
		assert_eq!(response.text(), "ok");
		assert!(!Response { status: 503, ..response }.is_success());
	}
}
