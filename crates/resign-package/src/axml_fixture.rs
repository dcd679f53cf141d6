//! Compiles small binary XML documents for manifest tests

use std::collections::HashMap;

const RES_STRING_POOL_TYPE: u16 = 0x0001;
const RES_XML_TYPE: u16 = 0x0003;
const RES_XML_START_NAMESPACE_TYPE: u16 = 0x0100;
const RES_XML_END_NAMESPACE_TYPE: u16 = 0x0101;
const RES_XML_START_ELEMENT_TYPE: u16 = 0x0102;
const RES_XML_END_ELEMENT_TYPE: u16 = 0x0103;

const NO_ENTRY_INDEX: u32 = 0xFFFF_FFFF;
const TYPE_STRING: u8 = 0x03;
const TYPE_INT_DEC: u8 = 0x10;
const TYPE_INT_BOOLEAN: u8 = 0x12;

const ANDROID_NS: &str = "http://schemas.android.com/apk/res/android";

pub enum Value {
    Bool(bool),
    Str(&'static str),
    Int(i32),
}

pub enum Node {
    Start(&'static str, Vec<(&'static str, Value)>),
    End(&'static str),
}

#[derive(Default)]
struct Pool {
    strings: Vec<String>,
    index: HashMap<String, u32>,
}

impl Pool {
    fn intern(&mut self, s: &str) -> u32 {
        if let Some(i) = self.index.get(s) {
            return *i;
        }
        let i = self.strings.len() as u32;
        self.strings.push(s.to_string());
        self.index.insert(s.to_string(), i);
        i
    }

    fn chunk(&self) -> Vec<u8> {
        let mut data = Vec::new();
        let mut offsets = Vec::new();
        for s in &self.strings {
            offsets.push(data.len() as u32);
            let units: Vec<u16> = s.encode_utf16().collect();
            data.extend_from_slice(&(units.len() as u16).to_le_bytes());
            for u in units {
                data.extend_from_slice(&u.to_le_bytes());
            }
            data.extend_from_slice(&0u16.to_le_bytes());
        }
        while data.len() % 4 != 0 {
            data.push(0);
        }
        let header = 28u32;
        let strings_start = header + 4 * offsets.len() as u32;
        let size = strings_start + data.len() as u32;

        let mut chunk = Vec::new();
        chunk.extend_from_slice(&RES_STRING_POOL_TYPE.to_le_bytes());
        chunk.extend_from_slice(&(header as u16).to_le_bytes());
        chunk.extend_from_slice(&size.to_le_bytes());
        chunk.extend_from_slice(&(offsets.len() as u32).to_le_bytes());
        chunk.extend_from_slice(&0u32.to_le_bytes());
        chunk.extend_from_slice(&0u32.to_le_bytes());
        chunk.extend_from_slice(&strings_start.to_le_bytes());
        chunk.extend_from_slice(&0u32.to_le_bytes());
        for o in offsets {
            chunk.extend_from_slice(&o.to_le_bytes());
        }
        chunk.extend_from_slice(&data);
        chunk
    }
}

fn node_chunk(chunk_type: u16, body: &[u8]) -> Vec<u8> {
    let mut chunk = Vec::new();
    chunk.extend_from_slice(&chunk_type.to_le_bytes());
    chunk.extend_from_slice(&16u16.to_le_bytes());
    chunk.extend_from_slice(&(16 + body.len() as u32).to_le_bytes());
    chunk.extend_from_slice(&1u32.to_le_bytes());
    chunk.extend_from_slice(&NO_ENTRY_INDEX.to_le_bytes());
    chunk.extend_from_slice(body);
    chunk
}

fn name_parts(name: &str) -> (bool, &str) {
    match name.strip_prefix("android:") {
        Some(local) => (true, local),
        None => (false, name),
    }
}

/// Compile `nodes` into a binary XML document with the android namespace declared
pub fn compile(nodes: &[Node]) -> Vec<u8> {
    let mut pool = Pool::default();
    let prefix = pool.intern("android");
    let uri = pool.intern(ANDROID_NS);

    let mut body = Vec::new();
    let mut ns_body = Vec::new();
    ns_body.extend_from_slice(&prefix.to_le_bytes());
    ns_body.extend_from_slice(&uri.to_le_bytes());
    body.extend(node_chunk(RES_XML_START_NAMESPACE_TYPE, &ns_body));

    for node in nodes {
        match node {
            Node::Start(tag, attributes) => {
                let mut element = Vec::new();
                element.extend_from_slice(&NO_ENTRY_INDEX.to_le_bytes());
                element.extend_from_slice(&pool.intern(tag).to_le_bytes());
                element.extend_from_slice(&20u16.to_le_bytes());
                element.extend_from_slice(&20u16.to_le_bytes());
                element.extend_from_slice(&(attributes.len() as u16).to_le_bytes());
                element.extend_from_slice(&[0u8; 6]);
                for (name, value) in attributes {
                    let (namespaced, local) = name_parts(name);
                    let ns = if namespaced { uri } else { NO_ENTRY_INDEX };
                    let (raw, data_type, data) = match value {
                        Value::Bool(b) => (
                            pool.intern(if *b { "true" } else { "false" }),
                            TYPE_INT_BOOLEAN,
                            if *b { 0xFFFF_FFFF } else { 0 },
                        ),
                        Value::Str(s) => {
                            let i = pool.intern(s);
                            (i, TYPE_STRING, i)
                        }
                        Value::Int(n) => (NO_ENTRY_INDEX, TYPE_INT_DEC, *n as u32),
                    };
                    element.extend_from_slice(&ns.to_le_bytes());
                    element.extend_from_slice(&pool.intern(local).to_le_bytes());
                    element.extend_from_slice(&raw.to_le_bytes());
                    element.extend_from_slice(&8u16.to_le_bytes());
                    element.push(0);
                    element.push(data_type);
                    element.extend_from_slice(&data.to_le_bytes());
                }
                body.extend(node_chunk(RES_XML_START_ELEMENT_TYPE, &element));
            }
            Node::End(tag) => {
                let mut element = Vec::new();
                element.extend_from_slice(&NO_ENTRY_INDEX.to_le_bytes());
                element.extend_from_slice(&pool.intern(tag).to_le_bytes());
                body.extend(node_chunk(RES_XML_END_ELEMENT_TYPE, &element));
            }
        }
    }
    body.extend(node_chunk(RES_XML_END_NAMESPACE_TYPE, &ns_body));

    let pool = pool.chunk();
    let mut document = Vec::new();
    document.extend_from_slice(&RES_XML_TYPE.to_le_bytes());
    document.extend_from_slice(&8u16.to_le_bytes());
    document.extend_from_slice(&(8 + pool.len() as u32 + body.len() as u32).to_le_bytes());
    document.extend(pool);
    document.extend(body);
    document
}
