use quick_xml::events::Event;
use quick_xml::Reader;

use crate::errors::RestartAppError;
use crate::instance::ControlPlane;
use crate::log::debug;

pub const POOL_PATH: &str = "/pool.xml";

/// Element path of a group node inside the pool document.
const GROUP_PATH: [&str; 4] = ["info", "supergroups", "supergroup", "group"];

/// An application group as listed by the server. Names are not unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRecord {
  pub name: String,
  pub app_root: String,
}

impl GroupRecord {
  pub fn new(name: impl Into<String>, app_root: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      app_root: app_root.into(),
    }
  }
}

/// Fetches the pool inventory with read-only credentials.
///
/// A non-2xx answer is returned as [`RestartAppError::Transport`] carrying the
/// response body untouched.
pub async fn query_pool(cp: &ControlPlane) -> Result<Vec<GroupRecord>, RestartAppError> {
  let response = cp.read(POOL_PATH).await?;
  if !response.is_success() {
    return Err(RestartAppError::Transport {
      action: "querying",
      status: response.status.as_u16(),
      body: response.body,
    });
  }

  let groups = parse_pool_xml(&response.body)?;
  debug(&format!("pool snapshot has {} group(s)", groups.len()));
  Ok(groups)
}

#[derive(Clone, Copy)]
enum Field {
  Name,
  AppRoot,
}

#[derive(Default)]
struct PendingGroup {
  name: Option<String>,
  app_root: Option<String>,
}

/// Walks the document keeping the current element path and collects the
/// `name` and `app_root` children of every `info/supergroups/supergroup/group`.
#[derive(Default)]
struct PoolParser {
  path: Vec<String>,
  group: Option<PendingGroup>,
  field: Option<Field>,
  groups: Vec<GroupRecord>,
}

impl PoolParser {
  fn at_group(&self) -> bool {
    self.path.len() == GROUP_PATH.len() && self.path.iter().zip(GROUP_PATH).all(|(a, b)| a == b)
  }

  fn start(&mut self, tag: String) {
    self.path.push(tag);
    if self.at_group() {
      self.group = Some(PendingGroup::default());
      return;
    }

    if self.path.len() != GROUP_PATH.len() + 1 {
      return;
    }
    let Some(group) = self.group.as_mut() else {
      return;
    };
    // Only the first occurrence of a field counts
    match self.path.last().map(String::as_str) {
      Some("name") if group.name.is_none() => {
        group.name = Some(String::new());
        self.field = Some(Field::Name);
      }
      Some("app_root") if group.app_root.is_none() => {
        group.app_root = Some(String::new());
        self.field = Some(Field::AppRoot);
      }
      _ => {}
    }
  }

  fn text(&mut self, text: &str) {
    let (Some(field), Some(group)) = (self.field, self.group.as_mut()) else {
      return;
    };
    let target = match field {
      Field::Name => &mut group.name,
      Field::AppRoot => &mut group.app_root,
    };
    if let Some(value) = target {
      value.push_str(text);
    }
  }

  fn end(&mut self) -> Result<(), RestartAppError> {
    if self.at_group() {
      if let Some(group) = self.group.take() {
        let index = self.groups.len();
        let name = group.name.ok_or_else(|| {
          RestartAppError::MalformedInventory(format!("group #{} has no name", index + 1))
        })?;
        let app_root = group.app_root.ok_or_else(|| {
          RestartAppError::MalformedInventory(format!("group '{}' has no app_root", name))
        })?;
        self.groups.push(GroupRecord { name, app_root });
      }
    } else if self.path.len() == GROUP_PATH.len() + 1 {
      self.field = None;
    }
    self.path.pop();
    Ok(())
  }
}

/// Parses a pool document into group records, in document order.
pub fn parse_pool_xml(xml: &str) -> Result<Vec<GroupRecord>, RestartAppError> {
  let mut reader = Reader::from_str(xml);
  let mut parser = PoolParser::default();

  loop {
    let event = reader.read_event().map_err(|e| {
      RestartAppError::MalformedInventory(format!(
        "{} at byte {}",
        e,
        reader.buffer_position()
      ))
    })?;

    match event {
      Event::Start(ref e) => {
        parser.start(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
      }
      Event::Empty(ref e) => {
        parser.start(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
        parser.end()?;
      }
      Event::Text(ref e) => {
        let text = e
          .unescape()
          .map_err(|e| RestartAppError::MalformedInventory(e.to_string()))?;
        parser.text(&text);
      }
      Event::CData(e) => {
        parser.text(&String::from_utf8_lossy(&e.into_inner()));
      }
      Event::End(_) => parser.end()?,
      Event::Eof => break,
      _ => {}
    }
  }

  if !parser.path.is_empty() {
    return Err(RestartAppError::MalformedInventory(format!(
      "unexpected end of document inside <{}>",
      parser.path.join("/")
    )));
  }

  Ok(parser.groups)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::instance::{AdminCredentials, Credentials, Secret};
  use wiremock::matchers::{basic_auth, method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  const POOL_XML: &str = r#"<?xml version="1.0" ?>
<info version="3">
  <process_count>3</process_count>
  <supergroups>
    <supergroup>
      <name>/webapps/foo</name>
      <group default="true">
        <name>/webapps/foo</name>
        <app_root>/webapps/foo</app_root>
        <processes>
          <process>
            <pid>1234</pid>
            <name>ignored</name>
          </process>
        </processes>
      </group>
    </supergroup>
    <supergroup>
      <name>/webapps/bar</name>
      <group>
        <app_root>/webapps/bar</app_root>
        <name>/webapps/bar#staging</name>
      </group>
      <group>
        <name>/webapps/bar</name>
        <app_root>/webapps/bar</app_root>
      </group>
    </supergroup>
  </supergroups>
</info>
"#;

  fn credentials() -> AdminCredentials {
    AdminCredentials {
      read_only: Credentials {
        username: "ro_admin".to_string(),
        secret: Secret::Value("ro".to_string()),
      },
      full: Credentials {
        username: "admin".to_string(),
        secret: Secret::Value("full".to_string()),
      },
    }
  }

  #[test]
  fn test_parse_pool_xml_in_document_order() {
    let groups = parse_pool_xml(POOL_XML).unwrap();
    assert_eq!(
      groups,
      vec![
        GroupRecord::new("/webapps/foo", "/webapps/foo"),
        GroupRecord::new("/webapps/bar#staging", "/webapps/bar"),
        GroupRecord::new("/webapps/bar", "/webapps/bar"),
      ]
    );
  }

  #[test]
  fn test_parse_pool_xml_keeps_duplicates() {
    let xml = "<info><supergroups><supergroup>\
      <group><name>a</name><app_root>/srv/a</app_root></group>\
      <group><name>a</name><app_root>/srv/a2</app_root></group>\
      </supergroup></supergroups></info>";
    let groups = parse_pool_xml(xml).unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[1].app_root, "/srv/a2");
  }

  #[test]
  fn test_parse_pool_xml_unescapes_text() {
    let xml = "<info><supergroups><supergroup><group>\
      <name>a &amp; b</name><app_root><![CDATA[/srv/a&b]]></app_root>\
      </group></supergroup></supergroups></info>";
    let groups = parse_pool_xml(xml).unwrap();
    assert_eq!(groups, vec![GroupRecord::new("a & b", "/srv/a&b")]);
  }

  #[test]
  fn test_parse_pool_xml_empty_field() {
    let xml = "<info><supergroups><supergroup><group>\
      <name>a</name><app_root/>\
      </group></supergroup></supergroups></info>";
    let groups = parse_pool_xml(xml).unwrap();
    assert_eq!(groups, vec![GroupRecord::new("a", "")]);
  }

  #[test]
  fn test_parse_pool_xml_ignores_groups_off_path() {
    let xml = "<info><group><name>stray</name><app_root>/x</app_root></group>\
      <supergroups/></info>";
    assert!(parse_pool_xml(xml).unwrap().is_empty());
  }

  #[test]
  fn test_parse_pool_xml_group_without_name() {
    let xml = "<info><supergroups><supergroup><group>\
      <app_root>/srv/a</app_root>\
      </group></supergroup></supergroups></info>";
    let err = parse_pool_xml(xml).unwrap_err();
    assert!(err.to_string().contains("has no name"));
  }

  #[test]
  fn test_parse_pool_xml_truncated() {
    let xml = "<info><supergroups><supergroup><group><name>a</name>";
    assert!(matches!(
      parse_pool_xml(xml),
      Err(RestartAppError::MalformedInventory(_))
    ));
  }

  #[tokio::test]
  async fn test_query_pool() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path(POOL_PATH))
      .and(basic_auth("ro_admin", "ro"))
      .respond_with(ResponseTemplate::new(200).set_body_string(POOL_XML))
      .expect(1)
      .mount(&server)
      .await;

    let cp = ControlPlane::new(server.uri(), credentials())?;
    let groups = query_pool(&cp).await?;
    assert_eq!(groups.len(), 3);
    Ok(())
  }

  #[tokio::test]
  async fn test_query_pool_error_keeps_body() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path(POOL_PATH))
      .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
      .expect(1)
      .mount(&server)
      .await;

    let cp = ControlPlane::new(server.uri(), credentials())?;
    match query_pool(&cp).await {
      Err(RestartAppError::Transport {
        action,
        status,
        body,
      }) => {
        assert_eq!(action, "querying");
        assert_eq!(status, 401);
        assert_eq!(body, "Unauthorized");
      }
      other => panic!("expected transport error, got {:?}", other),
    }
    Ok(())
  }
}
