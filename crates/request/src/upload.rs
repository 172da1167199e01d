//! Uploaded file descriptions.
//!
//! Front-ends report uploads as a tree keyed by form field name. Every field except
//! `data` is a complete file description and lands in the `form` parameter. The
//! `data` field holds one tree per descriptor (`name`, `type`, `tmp_name`, `error`,
//! `size`) mirroring the form structure; those trees are transposed into the request
//! data, so `data[Post][image]` ends up as `Post.image.name`, `Post.image.size`, ...
//! Indexed fields (`data[Files][]`) stay lists of file descriptions.

use serde_json::{Map, Value};
use tracing::trace;

use crate::value;

const DATA_FIELD: &str = "data";
const FORM_PARAM: &str = "form";

pub(crate) fn process_files(files: &Map<String, Value>, params: &mut Map<String, Value>, data: &mut Value) {
    for (name, file) in files.iter().filter(|(name, _)| *name != DATA_FIELD) {
        trace!(name = %name, "uploaded file");
        let form = value::as_object_mut(params.entry(FORM_PARAM).or_insert(Value::Null));
        form.insert(name.clone(), file.clone());
    }

    if let Some(Value::Object(descriptors)) = files.get(DATA_FIELD) {
        for (descriptor, tree) in descriptors {
            transpose(String::new(), tree, descriptor, data);
        }
    }
}

fn transpose(path: String, tree: &Value, descriptor: &str, data: &mut Value) {
    let children: Box<dyn Iterator<Item = (String, &Value)>> = match tree {
        Value::Object(map) => Box::new(map.iter().map(|(key, child)| (key.clone(), child))),
        Value::Array(list) => Box::new(list.iter().enumerate().map(|(index, child)| (index.to_string(), child))),
        _ => return,
    };

    for (key, child) in children {
        let child_path = if path.is_empty() { key } else { format!("{path}.{key}") };
        if child.is_object() || child.is_array() {
            transpose(child_path, child, descriptor, data);
        } else {
            value::insert_value(data, &format!("{child_path}.{descriptor}"), child.clone());
        }
    }
}
