//! Stand-in artifacts substituted when a generation or conversion step fails.
//!
//! Each placeholder is minimal but valid for its consumer: the geometry
//! compiles under OpenSCAD, the HTML renders on its own, and the model URL is
//! served by the front end.

/// Model URL used when the geometry could not be converted.
pub const PLACEHOLDER_MODEL_URL: &str = "/placeholder.glb";

pub const PLACEHOLDER_GEOMETRY: &str = r#"// Placeholder model
color([0.8, 0.2, 0.2]) {
    cube([20, 10, 5], center=true);
}
color([0.2, 0.2, 0.2]) {
    translate([0, 0, 2.5]) {
        cube([18, 8, 1], center=true);
    }
}
"#;

pub const PLACEHOLDER_CONCEPT: &str = "Game Concept: Racing Adventure

Type: 3D Racing Game
Objective: Drive through a winding track, collect coins, and reach the finish line as quickly as possible.

Controls:
- WASD or Arrow Keys: Move
- Space: Jump/Brake
- Mouse: Look around

Mechanics:
- Smooth movement physics
- Coin collection for points
- Obstacle avoidance
- Time-based scoring
- Track sections with increasing difficulty

Visual Style: Low-poly 3D with vibrant colors and a cartoon-like look
";

pub const PLACEHOLDER_ASSET_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>3D Game</title>
    <style>
        body { margin: 0; overflow: hidden; background: #87CEEB; }
        #gameContainer { width: 100vw; height: 100vh; }
        #ui { position: absolute; top: 20px; left: 20px; color: white; font-family: Arial; }
    </style>
</head>
<body>
    <div id="gameContainer"></div>
    <div id="ui">
        <h3>Score: <span id="score">0</span></h3>
        <p>Use WASD to move</p>
    </div>
    <script src="https://cdnjs.cloudflare.com/ajax/libs/three.js/r155/three.min.js"></script>
    <script>
        const scene = new THREE.Scene();
        const camera = new THREE.PerspectiveCamera(75, window.innerWidth / window.innerHeight, 0.1, 1000);
        const renderer = new THREE.WebGLRenderer();
        renderer.setSize(window.innerWidth, window.innerHeight);
        document.getElementById('gameContainer').appendChild(renderer.domElement);

        const geometry = new THREE.BoxGeometry();
        const material = new THREE.MeshBasicMaterial({ color: 0x00ff00 });
        const cube = new THREE.Mesh(geometry, material);
        scene.add(cube);

        camera.position.z = 5;

        function animate() {
            requestAnimationFrame(animate);
            cube.rotation.x += 0.01;
            cube.rotation.y += 0.01;
            renderer.render(scene, camera);
        }
        animate();
    </script>
</body>
</html>
"#;
