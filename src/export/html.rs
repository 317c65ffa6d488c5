// src/export/html.rs
// Standalone interactive HTML export: the mesh, every layer's values and
// lookup table, and a small inline WebGL2 viewer, all in one document with
// no external fetches.

use std::path::Path;

use serde::Serialize;

use crate::error::{DrapeError, DrapeResult};
use crate::render::pipeline::scalar_stream;
use crate::scene::Scene;

#[derive(Serialize)]
struct LayerPayload {
    name: String,
    label: String,
    values: Vec<f32>,
    lut: Vec<u8>,
    categorical: bool,
    range: [f32; 2],
}

#[derive(Serialize)]
struct Payload {
    grid: [usize; 2],
    xy: Vec<f32>,
    z_base: Vec<f32>,
    indices: Vec<u32>,
    layers: Vec<LayerPayload>,
    active: usize,
    exaggeration: f32,
}

fn build_payload(scene: &Scene) -> Payload {
    let mesh = &scene.mesh;
    let (w, h) = mesh.grid_shape();
    let scale = mesh.exaggeration();

    let mut xy = Vec::with_capacity(mesh.vertex_count() * 2);
    let mut z_base = Vec::with_capacity(mesh.vertex_count());
    for p in mesh.positions() {
        xy.push(p[0]);
        xy.push(p[1]);
        // store the unexaggerated geometry height so the in-page slider
        // can rescale from the same base the native slider uses
        z_base.push(p[2] / scale);
    }

    let layers = scene
        .layers()
        .iter()
        .map(|layer| {
            let values = scalar_stream(
                mesh.attribute(layer.kind.attr_name())
                    .expect("layer attribute attached at assembly"),
            );
            LayerPayload {
                name: layer.kind.attr_name().to_string(),
                label: layer.kind.label().to_string(),
                values,
                lut: layer.colormap.to_rgba8(),
                categorical: layer.colormap.is_categorical(),
                range: [layer.range.0, layer.range.1],
            }
        })
        .collect();

    Payload {
        grid: [w, h],
        xy,
        z_base,
        indices: mesh.indices().to_u32(),
        layers,
        active: scene.active_index(),
        exaggeration: scale,
    }
}

/// Assemble the full document as a string.
pub fn render_document(scene: &Scene) -> DrapeResult<String> {
    let payload = build_payload(scene);
    let json = serde_json::to_string(&payload)
        .map_err(|e| DrapeError::export(format!("payload serialization: {}", e)))?;

    let mut html = String::with_capacity(json.len() + 16 * 1024);
    html.push_str(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n  <meta charset=\"utf-8\">\n  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n  <title>drape3d terrain</title>\n",
    );
    html.push_str(STYLE);
    html.push_str("</head>\n<body>\n");
    html.push_str(
        "<div id=\"hud\">\n  <div id=\"buttons\"></div>\n  <label>Z scale <input id=\"zscale\" type=\"range\" min=\"0.1\" max=\"5.0\" step=\"0.1\"></label>\n  <span id=\"zval\"></span>\n</div>\n<canvas id=\"view\"></canvas>\n",
    );
    html.push_str(&format!("<script>\nconst DATA = {};\n</script>\n", json));
    html.push_str("<script>\n");
    html.push_str(VIEWER_JS);
    html.push_str("</script>\n</body>\n</html>\n");
    Ok(html)
}

/// Write the document to disk.
pub fn write_html(scene: &Scene, path: &Path) -> DrapeResult<()> {
    let html = render_document(scene)?;
    std::fs::write(path, html)
        .map_err(|e| DrapeError::export(format!("{}: {}", path.display(), e)))?;
    Ok(())
}

const STYLE: &str = "  <style>\n    html, body { margin: 0; height: 100%; background: #eee; font-family: sans-serif; }\n    #view { width: 100%; height: 100%; display: block; }\n    #hud { position: absolute; top: 10px; left: 10px; background: rgba(255,255,255,0.85); padding: 8px; border-radius: 4px; }\n    #hud button { display: block; margin: 4px 0; width: 110px; }\n    #hud button.active { background: #222; color: #fff; }\n  </style>\n";

const VIEWER_JS: &str = r#"
'use strict';
const NODATA = -1.0e29;
const canvas = document.getElementById('view');
const gl = canvas.getContext('webgl2');
if (!gl) { document.body.textContent = 'WebGL2 is required'; }

const W = DATA.grid[0], H = DATA.grid[1], N = W * H;
let scale = DATA.exaggeration;
let active = DATA.active;

// --- matrix helpers -------------------------------------------------------
function perspective(fovy, aspect, near, far) {
  const f = 1.0 / Math.tan(fovy / 2), nf = 1 / (near - far);
  return [f/aspect,0,0,0, 0,f,0,0, 0,0,(far+near)*nf,-1, 0,0,2*far*near*nf,0];
}
function lookAt(eye, target, up) {
  const sub = (a,b)=>[a[0]-b[0],a[1]-b[1],a[2]-b[2]];
  const norm = v => { const l = Math.hypot(v[0],v[1],v[2]) || 1; return [v[0]/l,v[1]/l,v[2]/l]; };
  const cross = (a,b)=>[a[1]*b[2]-a[2]*b[1], a[2]*b[0]-a[0]*b[2], a[0]*b[1]-a[1]*b[0]];
  const dot = (a,b)=>a[0]*b[0]+a[1]*b[1]+a[2]*b[2];
  const z = norm(sub(eye, target));
  const x = norm(cross(up, z));
  const y = cross(z, x);
  return [x[0],y[0],z[0],0, x[1],y[1],z[1],0, x[2],y[2],z[2],0,
          -dot(x,eye),-dot(y,eye),-dot(z,eye),1];
}

// --- geometry -------------------------------------------------------------
const positions = new Float32Array(N * 3);
function rebuildPositions() {
  for (let i = 0; i < N; i++) {
    positions[i*3]   = DATA.xy[i*2];
    positions[i*3+1] = DATA.xy[i*2+1];
    positions[i*3+2] = DATA.z_base[i] * scale;
  }
}
const normals = new Float32Array(N * 3);
function rebuildNormals() {
  for (let j = 0; j < H; j++) {
    for (let i = 0; i < W; i++) {
      const i0 = i > 0 ? i-1 : i, i1 = i+1 < W ? i+1 : i;
      const j0 = j > 0 ? j-1 : j, j1 = j+1 < H ? j+1 : j;
      const a = (j*W+i1)*3, b = (j*W+i0)*3, c = (j1*W+i)*3, d = (j0*W+i)*3;
      const dx = [positions[a]-positions[b], positions[a+1]-positions[b+1], positions[a+2]-positions[b+2]];
      const dy = [positions[c]-positions[d], positions[c+1]-positions[d+1], positions[c+2]-positions[d+2]];
      let n = [dx[1]*dy[2]-dx[2]*dy[1], dx[2]*dy[0]-dx[0]*dy[2], dx[0]*dy[1]-dx[1]*dy[0]];
      const l = Math.hypot(n[0],n[1],n[2]) || 1;
      if (n[2] < 0) { n = [-n[0],-n[1],-n[2]]; }
      const k = (j*W+i)*3;
      normals[k] = n[0]/l; normals[k+1] = n[1]/l; normals[k+2] = n[2]/l;
    }
  }
}

// --- GL setup -------------------------------------------------------------
const VS = `#version 300 es
in vec3 aPos; in vec3 aNrm; in float aScalar;
uniform mat4 uView, uProj;
out vec3 vNrm; out float vScalar;
void main() { gl_Position = uProj * uView * vec4(aPos, 1.0); vNrm = aNrm; vScalar = aScalar; }`;
const FS = `#version 300 es
precision highp float;
in vec3 vNrm; in float vScalar;
uniform sampler2D uLut;
uniform vec2 uClim; uniform float uCategorical; uniform vec3 uSun;
out vec4 color;
void main() {
  if (vScalar < -1.0e29) discard;
  float t;
  if (uCategorical > 0.5) { t = clamp((vScalar + 0.5) / 256.0, 0.0, 1.0); }
  else { t = clamp((vScalar - uClim.x) / max(uClim.y - uClim.x, 1e-6), 0.0, 1.0); }
  vec4 c = texture(uLut, vec2(t, 0.5));
  if (c.a < 0.004) discard;
  float shade = 0.35 + 0.65 * max(dot(normalize(vNrm), normalize(uSun)), 0.0);
  color = vec4(c.rgb * shade, 1.0);
}`;

function compile(type, src) {
  const s = gl.createShader(type);
  gl.shaderSource(s, src); gl.compileShader(s);
  if (!gl.getShaderParameter(s, gl.COMPILE_STATUS)) throw gl.getShaderInfoLog(s);
  return s;
}
const prog = gl.createProgram();
gl.attachShader(prog, compile(gl.VERTEX_SHADER, VS));
gl.attachShader(prog, compile(gl.FRAGMENT_SHADER, FS));
gl.linkProgram(prog);
gl.useProgram(prog);

const posBuf = gl.createBuffer(), nrmBuf = gl.createBuffer(), idxBuf = gl.createBuffer();
const scalarBufs = DATA.layers.map(layer => {
  const b = gl.createBuffer();
  gl.bindBuffer(gl.ARRAY_BUFFER, b);
  gl.bufferData(gl.ARRAY_BUFFER, new Float32Array(layer.values), gl.STATIC_DRAW);
  return b;
});
const luts = DATA.layers.map(layer => {
  const t = gl.createTexture();
  gl.bindTexture(gl.TEXTURE_2D, t);
  gl.texImage2D(gl.TEXTURE_2D, 0, gl.RGBA, 256, 1, 0, gl.RGBA, gl.UNSIGNED_BYTE, new Uint8Array(layer.lut));
  const filter = layer.categorical ? gl.NEAREST : gl.LINEAR;
  gl.texParameteri(gl.TEXTURE_2D, gl.TEXTURE_MIN_FILTER, filter);
  gl.texParameteri(gl.TEXTURE_2D, gl.TEXTURE_MAG_FILTER, filter);
  gl.texParameteri(gl.TEXTURE_2D, gl.TEXTURE_WRAP_S, gl.CLAMP_TO_EDGE);
  gl.texParameteri(gl.TEXTURE_2D, gl.TEXTURE_WRAP_T, gl.CLAMP_TO_EDGE);
  return t;
});
gl.bindBuffer(gl.ELEMENT_ARRAY_BUFFER, idxBuf);
gl.bufferData(gl.ELEMENT_ARRAY_BUFFER, new Uint32Array(DATA.indices), gl.STATIC_DRAW);

const aPos = gl.getAttribLocation(prog, 'aPos');
const aNrm = gl.getAttribLocation(prog, 'aNrm');
const aScalar = gl.getAttribLocation(prog, 'aScalar');
const uView = gl.getUniformLocation(prog, 'uView');
const uProj = gl.getUniformLocation(prog, 'uProj');
const uClim = gl.getUniformLocation(prog, 'uClim');
const uCategorical = gl.getUniformLocation(prog, 'uCategorical');
const uSun = gl.getUniformLocation(prog, 'uSun');
gl.uniform3f(uSun, 0.5, 0.6, 0.8);
gl.enable(gl.DEPTH_TEST);

function uploadGeometry() {
  rebuildPositions();
  rebuildNormals();
  gl.bindBuffer(gl.ARRAY_BUFFER, posBuf);
  gl.bufferData(gl.ARRAY_BUFFER, positions, gl.DYNAMIC_DRAW);
  gl.bindBuffer(gl.ARRAY_BUFFER, nrmBuf);
  gl.bufferData(gl.ARRAY_BUFFER, normals, gl.DYNAMIC_DRAW);
}

// --- camera ---------------------------------------------------------------
let radius = 1;
for (let i = 0; i < N; i++) {
  radius = Math.max(radius, Math.hypot(DATA.xy[i*2], DATA.xy[i*2+1], DATA.z_base[i] * scale));
}
let yaw = -Math.PI / 4, pitch = 0.6, dist = radius * 2.2;
let dragging = false, lastX = 0, lastY = 0;
canvas.addEventListener('mousedown', e => { dragging = true; lastX = e.clientX; lastY = e.clientY; });
window.addEventListener('mouseup', () => { dragging = false; });
window.addEventListener('mousemove', e => {
  if (!dragging) return;
  yaw -= (e.clientX - lastX) * 0.005;
  pitch = Math.min(Math.max(pitch + (e.clientY - lastY) * 0.005, -1.55), 1.55);
  lastX = e.clientX; lastY = e.clientY;
  draw();
});
canvas.addEventListener('wheel', e => {
  e.preventDefault();
  dist *= 1 + Math.sign(e.deltaY) * 0.1;
  dist = Math.min(Math.max(dist, radius * 0.05), radius * 20);
  draw();
}, { passive: false });

// --- draw -----------------------------------------------------------------
function draw() {
  canvas.width = canvas.clientWidth; canvas.height = canvas.clientHeight;
  gl.viewport(0, 0, canvas.width, canvas.height);
  gl.clearColor(0.93, 0.93, 0.93, 1.0);
  gl.clear(gl.COLOR_BUFFER_BIT | gl.DEPTH_BUFFER_BIT);

  const eye = [dist * Math.cos(pitch) * Math.cos(yaw),
               dist * Math.cos(pitch) * Math.sin(yaw),
               dist * Math.sin(pitch)];
  gl.uniformMatrix4fv(uView, false, new Float32Array(lookAt(eye, [0,0,0], [0,0,1])));
  gl.uniformMatrix4fv(uProj, false, new Float32Array(
    perspective(Math.PI / 4, canvas.width / canvas.height, Math.max(dist*0.001, 0.1), dist*50)));

  const layer = DATA.layers[active];
  gl.uniform2f(uClim, layer.range[0], layer.range[1]);
  gl.uniform1f(uCategorical, layer.categorical ? 1.0 : 0.0);
  gl.bindTexture(gl.TEXTURE_2D, luts[active]);

  gl.bindBuffer(gl.ARRAY_BUFFER, posBuf);
  gl.enableVertexAttribArray(aPos);
  gl.vertexAttribPointer(aPos, 3, gl.FLOAT, false, 0, 0);
  gl.bindBuffer(gl.ARRAY_BUFFER, nrmBuf);
  gl.enableVertexAttribArray(aNrm);
  gl.vertexAttribPointer(aNrm, 3, gl.FLOAT, false, 0, 0);
  gl.bindBuffer(gl.ARRAY_BUFFER, scalarBufs[active]);
  gl.enableVertexAttribArray(aScalar);
  gl.vertexAttribPointer(aScalar, 1, gl.FLOAT, false, 0, 0);

  gl.bindBuffer(gl.ELEMENT_ARRAY_BUFFER, idxBuf);
  gl.drawElements(gl.TRIANGLES, DATA.indices.length, gl.UNSIGNED_INT, 0);
}

// --- HUD ------------------------------------------------------------------
const buttonsDiv = document.getElementById('buttons');
const buttons = DATA.layers.map((layer, i) => {
  const b = document.createElement('button');
  b.textContent = layer.label;
  b.onclick = () => {
    active = i;
    buttons.forEach((bb, j) => bb.classList.toggle('active', j === active));
    draw();
  };
  buttonsDiv.appendChild(b);
  return b;
});
buttons[active].classList.add('active');

const zslider = document.getElementById('zscale');
const zval = document.getElementById('zval');
zslider.value = scale;
zval.textContent = scale.toFixed(1);
zslider.oninput = () => {
  scale = parseFloat(zslider.value);
  zval.textContent = scale.toFixed(1);
  uploadGeometry();
  draw();
};

window.addEventListener('resize', draw);
uploadGeometry();
draw();
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::AffineTransform;
    use crate::raster::RasterGrid;
    use crate::scene::{LayerKind, OverlayInput};

    fn scene() -> Scene {
        let dem = RasterGrid::from_parts(
            4,
            4,
            (0..16).map(|i| i as f64 * 10.0).collect(),
            AffineTransform::north_up(0.0, 4.0, 1.0, -1.0),
            "EPSG:26918",
        )
        .unwrap();
        let overlay = OverlayInput {
            kind: LayerKind::Nlcd,
            raster: dem.clone(),
            palette: None,
        };
        Scene::assemble(&dem, vec![overlay], 2.0).unwrap()
    }

    #[test]
    fn document_embeds_payload_and_viewer() {
        let html = render_document(&scene()).unwrap();
        assert!(html.starts_with("<!doctype html>"));
        assert!(html.contains("const DATA = {"));
        assert!(html.contains("\"grid\":[4,4]"));
        assert!(html.contains("\"nlcd\""));
        assert!(html.contains("\"elevation\""));
        assert!(html.contains("webgl2"));
        assert!(html.ends_with("</html>\n"));
        // self-contained: nothing fetched from the network
        assert!(!html.contains("http://"));
        assert!(!html.contains("https://"));
    }

    #[test]
    fn payload_z_base_is_unexaggerated() {
        let s = scene();
        let payload = build_payload(&s);
        // scene assembled with scale 2.0; base heights must be the raw DEM
        assert!((payload.exaggeration - 2.0).abs() < 1e-6);
        assert!((payload.z_base[1] - 10.0).abs() < 1e-3);
        assert_eq!(payload.xy.len(), 32);
        assert_eq!(payload.indices.len(), 3 * 3 * 6);
        assert_eq!(payload.layers.len(), 2);
        assert_eq!(payload.layers[0].lut.len(), 1024);
    }

    #[test]
    fn write_html_creates_file() {
        let dir = std::env::temp_dir().join("drape3d-html-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("terrain_nlcd.html");
        write_html(&scene(), &path).unwrap();
        let meta = std::fs::metadata(&path).unwrap();
        assert!(meta.len() > 0);
        std::fs::remove_file(&path).ok();
    }
}
